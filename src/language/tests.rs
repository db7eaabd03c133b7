use super::*;

#[test]
fn parse_codes_and_names() {
    assert_eq!("en".parse::<Language>(), Ok(Language::English));
    assert_eq!("TR".parse::<Language>(), Ok(Language::Turkish));
    assert_eq!("German".parse::<Language>(), Ok(Language::German));
    assert_eq!("Русский".parse::<Language>(), Ok(Language::Russian));
    assert_eq!(" français ".parse::<Language>(), Ok(Language::French));
}

#[test]
fn parse_unknown_language() {
    let err = "klingon".parse::<Language>().expect_err("should reject unknown language");
    assert_eq!(err, UnknownLanguage("klingon".to_string()));
}

#[test]
fn labels_match_picker_format() {
    assert_eq!(Language::Turkish.label(), "Türkçe TR");
    assert_eq!(Language::English.label(), "English EN");
    assert_eq!(Language::Russian.label(), "Русский RU");
}

#[test]
fn serde_uses_codes() {
    let json = serde_json::to_string(&Language::Spanish).expect("should serialize");
    assert_eq!(json, "\"es\"");

    let parsed: Language = serde_json::from_str("\"de\"").expect("should deserialize");
    assert_eq!(parsed, Language::German);
}

#[test]
fn default_is_pivot() {
    assert_eq!(Language::default(), Language::Turkish);
}
