//! Layout for delay reason text.

/// Greedy word wrap.
///
/// Words are split on any whitespace and never broken, so a word wider than
/// `width` gets a line of its own.
#[must_use]
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}

/// Prefix every line and join them with newlines
#[must_use]
pub fn indent<S: AsRef<str>>(lines: &[S], prefix: &str) -> String {
    lines
        .iter()
        .map(|line| format!("{prefix}{}", line.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
