use std::sync::Once;

use rasi_mio::{net::register_mio_network, timer::register_mio_timer};

/// prepare test enviroment.
pub fn setup() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        _ = pretty_env_logger::try_init_timed();

        register_mio_network();
        register_mio_timer();
    });
}

pub mod rpc;
