//! Google Maps Platform APIs a backend token can be minted for

use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const ROUTES_SCOPE: &str = "https://www.googleapis.com/auth/geo-platform.routes";
pub const ROUTES_AUDIENCE: &str = "https://routes.googleapis.com/";

/// Claims a token needs to call an API
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTokenInfo {
    pub scope: String,
    pub audience: String,
}

fn table() -> &'static BTreeMap<&'static str, ApiTokenInfo> {
    static APIS: OnceLock<BTreeMap<&'static str, ApiTokenInfo>> = OnceLock::new();
    APIS.get_or_init(|| {
        BTreeMap::from([(
            "routes",
            ApiTokenInfo {
                scope: ROUTES_SCOPE.to_string(),
                audience: ROUTES_AUDIENCE.to_string(),
            },
        )])
    })
}

pub fn is_wildcard(names: &[String]) -> bool {
    names.first().is_some_and(|n| n == "*")
}

pub fn is_known(name: &str) -> bool {
    table().contains_key(name)
}

/// Combined scope and audience for a set of APIs.
///
/// Unknown names are skipped. An audience is only set when exactly one API
/// matched; scopes are space-joined.
pub fn lookup(names: &[String]) -> ApiTokenInfo {
    let matched: Vec<&ApiTokenInfo> = if is_wildcard(names) {
        table().values().collect()
    } else {
        names.iter().filter_map(|n| table().get(n.as_str())).collect()
    };

    ApiTokenInfo {
        scope: matched
            .iter()
            .map(|api| api.scope.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        audience: match matched.as_slice() {
            [only] => only.audience.clone(),
            _ => String::new(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_lookup() {
        let cases = [
            (names(&["routes"]), ROUTES_SCOPE, ROUTES_AUDIENCE),
            (names(&["unknown"]), "", ""),
            (names(&["*"]), ROUTES_SCOPE, ROUTES_AUDIENCE),
        ];
        for (requested, scope, audience) in cases {
            let got = lookup(&requested);
            assert_eq!(got.scope, scope, "scope for {:?}", requested);
            assert_eq!(got.audience, audience, "audience for {:?}", requested);
        }
    }

    #[test]
    fn test_wildcard_and_known() {
        assert!(is_wildcard(&names(&["*"])));
        assert!(!is_wildcard(&names(&["routes", "*"])));
        assert!(!is_wildcard(&[]));
        assert!(is_known("routes"));
        assert!(!is_known("places"));
    }
}
