pub mod constants;
pub mod settings;

pub use constants::*;
pub use settings::{
    AllowedOrigins, BreakerSettings, CollaboratorSettings, EmailClientSettings, JwtSettings,
    RoostSettings,
};
