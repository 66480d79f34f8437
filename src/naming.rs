//! Conversions from a declared field name to its flag and environment identifiers.

/// Lowercase the leading run of capitals in `name`.
///
/// A single leading capital is lowercased. A longer run is treated as an
/// acronym: when it is followed by a lowercase letter its last capital starts
/// the next word and is kept, otherwise the whole run is lowercased.
///
/// ```
/// use config_bindr::naming::to_flag_name;
///
/// assert_eq!(to_flag_name("ServiceName"), "serviceName");
/// assert_eq!(to_flag_name("AWSInstanceName"), "awsInstanceName");
/// ```
pub fn to_flag_name(name: &str) -> String {
    let run = name.chars().take_while(|c| c.is_uppercase()).count();
    if run == 0 {
        return name.to_string();
    }

    let next_is_lower = name.chars().nth(run).is_some_and(char::is_lowercase);
    let lowered = if run > 1 && next_is_lower { run - 1 } else { run };

    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if i < lowered {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Split `name` into upper snake case words.
///
/// A word boundary is placed before every capital that is followed by a
/// lowercase letter or preceded by one, so acronym runs stay together.
///
/// ```
/// use config_bindr::naming::to_env_name;
///
/// assert_eq!(to_env_name("primaryAddress"), "PRIMARY_ADDRESS");
/// assert_eq!(to_env_name("AWSInfo"), "AWS_INFO");
/// ```
pub fn to_env_name(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let prev_lower = prev.is_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if (prev_lower || next_lower) && prev != '_' {
                out.push('_');
            }
        }
        out.extend(c.to_uppercase());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_name_single_capital() {
        assert_eq!(to_flag_name("Name"), "name");
        assert_eq!(to_flag_name("ServiceName"), "serviceName");
    }

    #[test]
    fn test_flag_name_acronym_followed_by_word() {
        assert_eq!(to_flag_name("AWSInfo"), "awsInfo");
        assert_eq!(to_flag_name("AWSInstanceName"), "awsInstanceName");
    }

    #[test]
    fn test_flag_name_all_caps() {
        assert_eq!(to_flag_name("AWS"), "aws");
        assert_eq!(to_flag_name("ID"), "id");
    }

    #[test]
    fn test_flag_name_empty_and_lowercase() {
        assert_eq!(to_flag_name(""), "");
        assert_eq!(to_flag_name("timeout"), "timeout");
    }

    #[test]
    fn test_flag_name_only_touches_leading_run() {
        assert_eq!(to_flag_name("MaxHTTPConns"), "maxHTTPConns");
    }

    #[test]
    fn test_flag_name_idempotent() {
        for name in ["Name", "ServiceName", "AWSInfo", "AWSInstanceName", "UInt8", "X"] {
            let once = to_flag_name(name);
            assert_eq!(to_flag_name(&once), once, "not idempotent for {name}");
        }
    }

    #[test]
    fn test_env_name() {
        assert_eq!(to_env_name("ServiceName"), "SERVICE_NAME");
        assert_eq!(to_env_name("name"), "NAME");
        assert_eq!(to_env_name("Address1"), "ADDRESS1");
        assert_eq!(to_env_name("primaryAddress"), "PRIMARY_ADDRESS");
    }

    #[test]
    fn test_env_name_keeps_acronyms_together() {
        assert_eq!(to_env_name("AWSInfo"), "AWS_INFO");
        assert_eq!(to_env_name("HTTPServer"), "HTTP_SERVER");
        assert_eq!(to_env_name("UInt64"), "U_INT64");
    }

    #[test]
    fn test_env_name_idempotent_on_canonical_form() {
        for name in ["ServiceName", "AWSInfo", "primaryAddress", "Address1"] {
            let once = to_env_name(name);
            assert_eq!(to_env_name(&once), once);
        }
    }

    #[test]
    fn test_env_name_no_double_underscore() {
        assert_eq!(to_env_name("service_Name"), "SERVICE_NAME");
    }
}
