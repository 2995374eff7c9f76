//! Anti-forgery token lookup.

/// Name of the hidden form field carrying the token.
pub const FORM_FIELD: &str = "csrfmiddlewaretoken";
/// Cookie consulted when no form field is present.
pub const COOKIE_NAME: &str = "csrftoken";
/// Request header the server checks (`X-CSRFToken`).
pub const HEADER: &str = "x-csrftoken";

/// Pick the token: the form field wins, otherwise the cookie.
pub fn resolve(form_field: Option<&str>, cookie_header: Option<&str>) -> Option<String> {
    form_field
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| cookie_header.and_then(|c| cookie_value(c, COOKIE_NAME)))
}

/// Value of `name` in a `Cookie` header, percent-decoded.
pub fn cookie_value(header: &str, name: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        if key != name {
            return None;
        }
        match urlencoding::decode(value) {
            Ok(decoded) => Some(decoded.into_owned()),
            Err(e) => {
                tracing::warn!("cookie {name} is not valid percent-encoding: {e}");
                Some(value.to_string())
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_field_takes_precedence() {
        assert_eq!(
            resolve(Some("form"), Some("csrftoken=cookie")),
            Some("form".to_string())
        );
    }

    #[test]
    fn falls_back_to_decoded_cookie() {
        let header = "sessionid=abc; csrftoken=a%2Bb%3D; theme=dark";
        assert_eq!(resolve(None, Some(header)), Some("a+b=".to_string()));
        assert_eq!(resolve(Some(""), Some(header)), Some("a+b=".to_string()));
    }

    #[test]
    fn prefix_names_do_not_match() {
        assert_eq!(cookie_value("xcsrftoken=1", COOKIE_NAME), None);
        assert_eq!(resolve(None, None), None);
    }
}
