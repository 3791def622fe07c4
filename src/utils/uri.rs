/// Replaces the userinfo part of a connection string so credentials never reach logs or errors.
pub fn redact_uri(uri: &str) -> String {
    let Some(scheme_end) = uri.find("://") else {
        return uri.to_string();
    };
    let authority_start = scheme_end + 3;
    let rest = &uri[authority_start..];
    let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());

    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &uri[..authority_start], &rest[at..]),
        None => uri.to_string(),
    }
}
