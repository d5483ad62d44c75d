use crate::{Error, Result};

/// The base protocol id of rpc streams.
pub const PROTOCOL_P2P_RPC: &str = "/xstack/rpc/0.0.1";

/// Derive the protocol id of one rpc service from `base` and `suffix`.
///
/// An empty `suffix` returns `base` unchanged, otherwise returns `{base}/{suffix}`.
/// Suffixes containing `/` are rejected, so that two distinct suffixes never derive the same id.
pub fn protocol_id(base: &str, suffix: &str) -> Result<String> {
    if suffix.is_empty() {
        return Ok(base.to_owned());
    }

    if suffix.contains(['/', '\n', '\r']) {
        return Err(Error::InvalidSuffix(suffix.to_owned()));
    }

    Ok(format!("{}/{}", base, suffix))
}

pub(crate) fn check_base(base: &str) -> Result<()> {
    if !base.starts_with('/') || base.len() < 2 || base.ends_with('/') || base.contains(['\n', '\r'])
    {
        return Err(Error::InvalidProtocol(base.to_owned()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_suffix() {
        assert_eq!(protocol_id(PROTOCOL_P2P_RPC, "").unwrap(), PROTOCOL_P2P_RPC);
    }

    #[test]
    fn join_suffix() {
        assert_eq!(
            protocol_id(PROTOCOL_P2P_RPC, "0x123456789").unwrap(),
            "/xstack/rpc/0.0.1/0x123456789"
        );
    }

    #[test]
    fn distinct_suffixes() {
        let suffixes = ["0x123456781", "0x123456782", "svc1", "svc2", "a", "b"];

        let ids = suffixes
            .iter()
            .map(|suffix| protocol_id(PROTOCOL_P2P_RPC, suffix).unwrap())
            .collect::<std::collections::HashSet<_>>();

        assert_eq!(ids.len(), suffixes.len());
    }

    #[test]
    fn reject_separator() {
        assert!(matches!(
            protocol_id(PROTOCOL_P2P_RPC, "a/b"),
            Err(Error::InvalidSuffix(_))
        ));

        assert!(matches!(
            protocol_id(PROTOCOL_P2P_RPC, "a\n"),
            Err(Error::InvalidSuffix(_))
        ));
    }

    #[test]
    fn base_check() {
        check_base(PROTOCOL_P2P_RPC).unwrap();
        check_base("/echo").unwrap();

        assert!(check_base("").is_err());
        assert!(check_base("/").is_err());
        assert!(check_base("echo/1.0").is_err());
        assert!(check_base("/echo/").is_err());
    }
}
