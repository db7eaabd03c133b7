use super::*;

#[test]
fn default_template_embeds_context_and_question() {
    let prompt = PromptTemplate::default().render(
        "Yogurt soup: mix 2 cups yogurt with dill.",
        "yogurt dill soup",
        None,
    );

    assert!(prompt.contains("Sen bir şef asistanısın."));
    assert!(prompt.contains("Yogurt soup: mix 2 cups yogurt with dill."));
    assert!(prompt.contains("Malzemeler: yogurt dill soup"));
    assert!(!prompt.contains(CONTEXT_PLACEHOLDER));
    assert!(!prompt.contains(QUESTION_PLACEHOLDER));
}

#[test]
fn language_instruction_is_appended() {
    let template = PromptTemplate::parse("C: {context}\nQ: {question}\n").expect("valid template");
    let prompt = template.render("ayran", "yoğurt", Some(Language::French));
    assert_eq!(prompt, "C: ayran\nQ: yoğurt\n\nRespond in French.\n");
}

#[test]
fn placeholders_inside_values_are_left_alone() {
    let template = PromptTemplate::parse("{question} | {context}").expect("valid template");
    let prompt = template.render("{question}", "{context}", None);
    assert_eq!(prompt, "{context} | {question}");
}

#[test]
fn repeated_placeholders_are_all_filled() {
    let template =
        PromptTemplate::parse("{question}: {context} ({question})").expect("valid template");
    assert_eq!(template.render("cacık", "yoğurt", None), "yoğurt: cacık (yoğurt)");
}

#[test]
fn template_without_placeholders_is_rejected() {
    assert!(matches!(
        PromptTemplate::parse("Only {question}"),
        Err(ConfigError::InvalidTemplate("{context}"))
    ));
    assert!(matches!(
        "Only {context}".parse::<PromptTemplate>(),
        Err(ConfigError::InvalidTemplate("{question}"))
    ));
}
