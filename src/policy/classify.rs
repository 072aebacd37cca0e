//! Endpoint classification.
//!
//! Each user-supplied endpoint is either an IP/CIDR literal or a domain name.
//! Anything that does not parse as an address or network is taken to be a
//! hostname, with no further syntax checks.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;

/// The outcome of classifying a single endpoint token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// An address range, already normalized (host bits cleared).
    Cidr(IpNet),
    /// Anything else, kept verbatim.
    Domain(String),
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Classification::Cidr(net) => write!(f, "{}", net),
            Classification::Domain(name) => f.write_str(name),
        }
    }
}

/// Classify a trimmed, non-empty endpoint token.
///
/// Bare addresses become single-address networks (`/32` or `/128`).
/// Networks are truncated to their canonical base address, so
/// `10.1.2.3/8` and `10.0.0.0/8` both yield `10.0.0.0/8`.
pub fn classify(token: &str) -> Classification {
    if let Ok(net) = token.parse::<IpNet>() {
        return Classification::Cidr(net.trunc());
    }
    if let Ok(addr) = token.parse::<IpAddr>() {
        return Classification::Cidr(IpNet::from(addr));
    }
    Classification::Domain(token.to_string())
}

/// Split a comma-separated endpoint list into trimmed, non-empty tokens.
pub fn split_endpoints(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cidr(token: &str) -> String {
        match classify(token) {
            Classification::Cidr(net) => net.to_string(),
            other => panic!("expected CIDR for '{}', got {:?}", token, other),
        }
    }

    #[test]
    fn ipv4_cidr_is_kept() {
        assert_eq!(cidr("10.0.0.0/8"), "10.0.0.0/8");
        assert_eq!(cidr("192.168.1.0/24"), "192.168.1.0/24");
    }

    #[test]
    fn bare_ipv4_becomes_slash_32() {
        assert_eq!(cidr("1.2.3.4"), "1.2.3.4/32");
    }

    #[test]
    fn bare_ipv6_becomes_slash_128() {
        assert_eq!(cidr("2001:db8::1"), "2001:db8::1/128");
    }

    #[test]
    fn ipv6_is_lowercased_and_compressed() {
        assert_eq!(cidr("2001:DB8:0:0:0:0:0:1"), "2001:db8::1/128");
        assert_eq!(cidr("FE80::/10"), "fe80::/10");
    }

    #[test]
    fn host_bits_are_cleared() {
        assert_eq!(cidr("10.1.2.3/8"), "10.0.0.0/8");
        assert_eq!(cidr("2001:db8::1/32"), "2001:db8::/32");
    }

    #[test]
    fn normalized_form_reparses_to_same_range() {
        for token in ["10.1.2.3/8", "1.2.3.4", "2001:DB8::1", "fe80::1/64", "0.0.0.0/0"] {
            let normalized = cidr(token);
            let reparsed: IpNet = normalized.parse().unwrap();
            assert_eq!(reparsed.to_string(), normalized);
            assert_eq!(reparsed, reparsed.trunc());
        }
    }

    #[test]
    fn domains_are_returned_unchanged() {
        for token in ["example.com", "api.github.com", "localhost", "*.example.com", "Weird_Name"] {
            assert_eq!(classify(token), Classification::Domain(token.to_string()));
        }
    }

    #[test]
    fn near_miss_addresses_fall_back_to_domain() {
        for token in ["[::1]", "10.0.0.1:443", "10.0.0.0/33", "256.0.0.1", "10.0.0"] {
            assert_eq!(
                classify(token),
                Classification::Domain(token.to_string()),
                "'{}' should be treated as a domain",
                token
            );
        }
    }

    #[test]
    fn split_drops_empty_pieces_and_trims() {
        let tokens: Vec<&str> = split_endpoints(" ,a.com,, 10.0.0.0/8 ,\t,").collect();
        assert_eq!(tokens, vec!["a.com", "10.0.0.0/8"]);
    }

    #[test]
    fn split_empty_input_yields_nothing() {
        assert_eq!(split_endpoints("").count(), 0);
        assert_eq!(split_endpoints("  ,  ").count(), 0);
    }

    #[test]
    fn display_matches_list_entry() {
        assert_eq!(classify("1.2.3.4").to_string(), "1.2.3.4/32");
        assert_eq!(classify("example.com").to_string(), "example.com");
    }
}
