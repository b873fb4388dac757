#![forbid(unsafe_code)]

const TOKEN_USER: &str = "x-access-token";

/// Embed `token` into an HTTPS remote that carries no userinfo yet. SSH remotes, `file://`
/// URLs and local paths are returned unchanged, as is everything when no token is set.
pub fn authenticated_url(url: &str, token: Option<&str>) -> String {
    let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) else {
        return url.to_string();
    };
    let Some(rest) = url.strip_prefix("https://") else {
        return url.to_string();
    };
    let authority = rest.split('/').next().unwrap_or_default();
    if authority.is_empty() || authority.contains('@') {
        return url.to_string();
    }
    format!("https://{TOKEN_USER}:{token}@{rest}")
}

/// Drop the userinfo part of a `scheme://user@host/...` URL.
pub fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let authority = &rest[..authority_end];
    match authority.rfind('@') {
        Some(at) => format!("{scheme}://{}{}", &authority[at + 1..], &rest[authority_end..]),
        None => url.to_string(),
    }
}

/// Redact every URL-looking word of free text, such as git stderr.
pub fn redact_text(text: &str) -> String {
    if !text.contains("://") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut word = String::new();
    for ch in text.chars() {
        if ch.is_whitespace() || ch == '\'' || ch == '"' {
            out.push_str(&redact_word(&word));
            word.clear();
            out.push(ch);
        } else {
            word.push(ch);
        }
    }
    out.push_str(&redact_word(&word));
    out
}

fn redact_word(word: &str) -> String {
    if word.contains("://") {
        redact_url(word)
    } else {
        word.to_string()
    }
}
