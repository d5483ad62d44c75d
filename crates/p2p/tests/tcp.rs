use async_trait::async_trait;
use xstack::{PeerInfo, Switch};
use xstack_rpc_p2p::{Host, Result};
use xstack_rpc_spec::rpc::{rpc_specs, RpcSpecContext};
use xstack_tcp::TcpTransport;

struct TcpMock;

async fn create_switch() -> Result<Switch> {
    let switch = Switch::new("rpc-spec")
        .transport(TcpTransport)
        .transport_bind(["/ip4/127.0.0.1/tcp/0"])
        .create()
        .await?;

    Ok(switch)
}

#[async_trait]
impl RpcSpecContext for TcpMock {
    async fn create_hosts(&self) -> Result<(Host, Host)> {
        let server = create_switch().await?;
        let client = create_switch().await?;

        client
            .insert_peer_info(PeerInfo {
                id: server.local_id().clone(),
                addrs: server.local_addrs().await,
                ..Default::default()
            })
            .await?;

        Ok((server.into(), client.into()))
    }
}

#[futures_test::test]
async fn test_specs() {
    rpc_specs(TcpMock).await.unwrap();
}
