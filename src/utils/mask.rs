//! Display-only redaction of personal fields. Stored records stay unmasked.

pub fn mask_name(name: &str) -> String {
    match name.chars().next() {
        Some(first) => format!("{}*", first),
        None => String::new(),
    }
}

pub fn mask_phone(phone: &str) -> String {
    let chars: Vec<char> = phone.chars().collect();
    if chars.len() < 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
