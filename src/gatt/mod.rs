pub mod resolver;
pub mod traits;

pub use resolver::{CharacteristicResolver, ResolvedCharacteristics};
pub use traits::{
    Characteristic, GattConnector, GattLink, Handle, LinkError, Notification, NotificationStream,
};
