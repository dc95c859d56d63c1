// camlay-api: async clients for the camera overlay endpoint and OctoPrint

pub mod auth;
pub mod camera;
pub mod error;
pub mod octoprint;
pub mod transport;

pub use auth::DigestCredentials;
pub use camera::{CameraClient, Delivery};
pub use error::Error;
pub use octoprint::{OctoPrintClient, PushHandle, PushMessage};
pub use transport::{TlsMode, TransportConfig};
