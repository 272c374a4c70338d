//! UI translations.
//!
//! The home page carries a handful of labels. They are looked up by locale,
//! which defaults to the ISO-639-1 form of the first content language.
//! Unknown locales fall back to English with an error log.

use tracing::error;

/// Translated UI strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Labels {
    pub search: &'static str,
    pub search_input: &'static str,
    pub close: &'static str,
    pub loading: &'static str,
    pub no_result: &'static str,
    pub back_to_top: &'static str,
    pub about: &'static str,
}

const EN: Labels = Labels {
    search: "Search",
    search_input: "Keywords…",
    close: "Close",
    loading: "Loading…",
    no_result: "No result for this search request.",
    back_to_top: "Back to Top",
    about: "About this content",
};

const FR: Labels = Labels {
    search: "Rechercher",
    search_input: "Mots-clés…",
    close: "Fermer",
    loading: "Chargement…",
    no_result: "Aucun résultat pour cette recherche.",
    back_to_top: "Haut de page",
    about: "À propos de ce contenu",
};

const ES: Labels = Labels {
    search: "Buscar",
    search_input: "Palabras clave…",
    close: "Cerrar",
    loading: "Cargando…",
    no_result: "No hay resultados para esta búsqueda.",
    back_to_top: "Volver arriba",
    about: "Acerca de este contenido",
};

const PT: Labels = Labels {
    search: "Pesquisar",
    search_input: "Palavras-chave…",
    close: "Fechar",
    loading: "Carregando…",
    no_result: "Nenhum resultado para esta pesquisa.",
    back_to_top: "Voltar ao topo",
    about: "Sobre este conteúdo",
};

/// Resolved UI locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    /// ISO-639-1 code actually used.
    pub code: String,
    pub labels: Labels,
}

/// ISO-639-1 code for an ISO-639-3 (or already 639-1) language code.
pub fn iso_639_1(language: &str) -> Option<&'static str> {
    let code = match language.trim().to_ascii_lowercase().as_str() {
        "eng" | "en" => "en",
        "fra" | "fre" | "fr" => "fr",
        "spa" | "es" => "es",
        "por" | "pt" => "pt",
        "deu" | "ger" | "de" => "de",
        "ita" | "it" => "it",
        "ara" | "ar" => "ar",
        "hin" | "hi" => "hi",
        "rus" | "ru" => "ru",
        "zho" | "chi" | "zh" => "zh",
        "swa" | "sw" => "sw",
        "wol" | "wo" => "wo",
        "ful" | "ff" => "ff",
        "hau" | "ha" => "ha",
        "amh" | "am" => "am",
        _ => return None,
    };
    Some(code)
}

fn labels_for(code: &str) -> Option<Labels> {
    // "pt_BR", "fr-CA" → language part
    let language = code.split(['_', '-']).next().unwrap_or(code).to_ascii_lowercase();
    match language.as_str() {
        "en" => Some(EN),
        "fr" => Some(FR),
        "es" => Some(ES),
        "pt" => Some(PT),
        _ => None,
    }
}

/// Pick the UI locale from an explicit `--locale` or the first content language.
pub fn resolve_locale(locale: Option<&str>, languages: &str) -> Locale {
    let requested = match locale.map(str::trim).filter(|l| !l.is_empty()) {
        Some(explicit) => explicit.to_string(),
        None => {
            let first = languages.split(',').next().unwrap_or(languages);
            iso_639_1(first).unwrap_or(first).trim().to_string()
        }
    };

    match labels_for(&requested) {
        Some(labels) => Locale {
            code: requested,
            labels,
        },
        None => {
            error!("No locale for {requested}. Use --locale to specify it. defaulting to en");
            Locale {
                code: "en".to_string(),
                labels: EN,
            }
        }
    }
}
