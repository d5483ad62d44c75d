use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use xstack::multiaddr::{Multiaddr, Protocol};

/// Placeholder returned when no local address can be expressed as [`SocketAddr`].
pub const PLACEHOLDER_LOCAL_ADDR: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

/// Placeholder returned when the remote address can't be expressed as [`SocketAddr`].
pub const PLACEHOLDER_PEER_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 1);

/// Convert `/ip4|ip6/../tcp|udp/..` prefixed [`Multiaddr`] into [`SocketAddr`].
pub fn to_sockaddr(addr: &Multiaddr) -> Option<SocketAddr> {
    let mut iter = addr.iter();

    let ip = match iter.next()? {
        Protocol::Ip4(ip) => IpAddr::from(ip),
        Protocol::Ip6(ip) => IpAddr::from(ip),
        _ => return None,
    };

    match iter.next()? {
        Protocol::Tcp(port) | Protocol::Udp(port) => Some(SocketAddr::new(ip, port)),
        _ => None,
    }
}

/// Returns the first convertible address of `addrs`.
pub(crate) fn first_sockaddr<'a, I>(addrs: I) -> Option<SocketAddr>
where
    I: IntoIterator<Item = &'a Multiaddr>,
{
    addrs.into_iter().find_map(to_sockaddr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert() {
        let addr: Multiaddr = "/ip4/127.0.0.1/tcp/4001".parse().unwrap();
        assert_eq!(to_sockaddr(&addr), Some("127.0.0.1:4001".parse().unwrap()));

        let addr: Multiaddr = "/ip6/::1/udp/4001/quic-v1".parse().unwrap();
        assert_eq!(to_sockaddr(&addr), Some("[::1]:4001".parse().unwrap()));

        let addr: Multiaddr = "/memory/10".parse().unwrap();
        assert_eq!(to_sockaddr(&addr), None);

        let addr: Multiaddr = "/ip4/127.0.0.1".parse().unwrap();
        assert_eq!(to_sockaddr(&addr), None);
    }

    #[test]
    fn first_convertible() {
        let addrs: Vec<Multiaddr> = vec![
            "/memory/10".parse().unwrap(),
            "/ip4/10.0.0.1/tcp/1".parse().unwrap(),
            "/ip4/10.0.0.2/tcp/2".parse().unwrap(),
        ];

        assert_eq!(
            first_sockaddr(&addrs),
            Some("10.0.0.1:1".parse().unwrap())
        );

        assert_eq!(first_sockaddr(&Vec::<Multiaddr>::new()), None);
    }
}
