//! External collaborators consumed by the engine.

mod traits;

pub use traits::{
    ConfigProvider, ConnectivityProbe, StaticConfigProvider, StaticConnectivity, Transport,
};
