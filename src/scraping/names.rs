//! Cleanup of event titles as the schools publish them.

const RENAMES: &[(&str, &str)] = &[("Vienna Salsa Splash", "Salsa Splash")];

/// Normalizes an event title. Applying it twice gives the same result as once.
pub fn clean_name(raw: &str) -> String {
    let mut name = raw.to_string();
    loop {
        let next = clean_once(&name);
        if next == name {
            return name;
        }
        name = next;
    }
}

fn clean_once(raw: &str) -> String {
    let mut name = raw;

    // Some titles come wrapped in quotes.
    if name.len() > 2 && name.starts_with('"') && name.ends_with('"') {
        name = &name[1..name.len() - 1];
    }

    // A fully shouted title becomes sentence case, otherwise only the shouted words change.
    let mut name = if is_all_caps(name) {
        capitalize(name)
    } else {
        name.split(' ')
            .map(|word| {
                if is_all_caps(word) {
                    capitalize(word)
                } else {
                    word.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    };

    if name.len() > 3 && name.ends_with("...") {
        name.truncate(name.len() - 3);
    }

    // Matched regardless of case so a shouted title still finds its canonical name.
    let lowered = name.to_lowercase();
    match RENAMES.iter().find(|(from, _)| from.to_lowercase() == lowered) {
        Some((_, to)) => to.to_string(),
        None => name,
    }
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_uppercase) && !word.chars().any(char::is_lowercase)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
