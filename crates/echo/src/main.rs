use std::io;

use clap::Parser;
use futures::{executor::block_on, future::pending};
use rasi::task::spawn_ok;
use rasi_mio::{net::register_mio_network, timer::register_mio_timer};
use xstack::{multiaddr::Multiaddr, PeerInfo, Switch};
use xstack_rpc_echo::{dial_echo, echo_server, split_p2p_addr};
use xstack_rpc_p2p::{Lifecycle, Result, RpcProtocol};
use xstack_tcp::TcpTransport;

#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = "Serve the echo rpc service over libp2p streams, and optionally call a remote one"
)]
struct Echo {
    /// The tcp port to listen on.
    #[arg(short, long)]
    listen: u16,

    /// The peer to dial, e.g. `/ip4/127.0.0.1/tcp/4001/p2p/<peer id>`.
    #[arg(short, long)]
    dest: Option<Multiaddr>,

    /// The message to echo.
    #[arg(short, long, default_value = "Hello, world")]
    message: String,

    /// The rpc protocol suffix.
    #[arg(short, long, default_value = "")]
    suffix: String,

    /// Use verbose output
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

fn main() {
    register_mio_network();
    register_mio_timer();

    if let Err(err) = block_on(run()) {
        log::error!("echo exit with error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = Echo::parse();

    let level = if config.verbose {
        log::LevelFilter::Trace
    } else {
        log::LevelFilter::Info
    };

    pretty_env_logger::formatted_timed_builder()
        .filter_level(level)
        .init();

    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let switch = Switch::new(format!("xstack-rpc-echo-{}", VERSION))
        .transport(TcpTransport)
        .transport_bind([format!("/ip4/0.0.0.0/tcp/{}", config.listen)])
        .create()
        .await?;

    for laddr in switch.local_addrs().await {
        log::info!("listen on {}/p2p/{}", laddr, switch.local_id());
    }

    let protocol = RpcProtocol::new(switch.clone(), Lifecycle::new());

    protocol.register_suffix(&config.suffix).await?;

    let server = echo_server(switch.local_id());

    let serve = protocol.clone();

    spawn_ok(async move {
        if let Err(err) = serve.serve(&server).await {
            log::error!("echo server stopped, err={}", err);
        }
    });

    let Some(dest) = config.dest else {
        log::info!("listening for connections");

        pending::<()>().await;

        return Ok(());
    };

    let (peer_id, raddr) = split_p2p_addr(&dest).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("missing /p2p/<peer id> in {}", dest),
        )
    })?;

    switch
        .insert_peer_info(PeerInfo {
            id: peer_id.clone(),
            addrs: vec![raddr],
            ..Default::default()
        })
        .await?;

    log::info!("dialing {} via rpc", peer_id);

    let client = dial_echo(&protocol, &peer_id, &config.suffix).await?;

    let reply = client.echo(&config.message).await?;

    let json = protobuf_json_mapping::print_to_string(&reply)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    log::info!("read reply:");

    println!("{}", json);

    client.close().await?;

    Ok(())
}
