use crate::models::DreamRequest;

pub const INTERPRET_SYSTEM: &str = include_str!("../data/prompts/interpret_system.txt");
pub const INTERPRET_USER: &str = include_str!("../data/prompts/interpret_user.txt");

/// Replace `{{key}}` placeholders in a template string.
///
/// Substitution is a single pass over the template: substituted values are
/// never scanned again, and unknown placeholders are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let found = after.find("}}").and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (end, *value))
        });
        match found {
            Some((end, value)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }
    result.push_str(rest);
    result
}

/// Render the user message for an interpretation request.
pub fn interpret_user(request: &DreamRequest) -> String {
    let mut context = Vec::new();
    if let Some(mood) = &request.mood {
        context.push(format!("The dreamer felt: {}", mood.label()));
    }
    if !request.tags.is_empty() {
        let tags: Vec<&str> = request.tags.iter().map(String::as_str).collect();
        context.push(format!("Tags: {}", tags.join(", ")));
    }
    let context = if context.is_empty() {
        String::new()
    } else {
        format!("\n{}", context.join("\n"))
    };

    render(
        INTERPRET_USER,
        &[("dream", request.dream_text.trim()), ("context", &context)],
    )
    .trim_end()
    .to_string()
}
