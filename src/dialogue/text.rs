//! Small text helpers shared by the router and the handlers

/// Capitalize the first letter of every alphabetic run, lowercase the rest.
///
/// "new york" -> "New York", "o'neil" -> "O'Neil"
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;
    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Strip ASCII punctuation, trim, and title-case a city name from the model
pub fn sanitize_city(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !c.is_ascii_punctuation()).collect();
    title_case(stripped.trim())
}
