pub mod env {
    pub const CONFIG_PATH_ENV_VAR: &str = "ROOST_CONFIG_PATH";
    pub const ENV_PREFIX: &str = "ROOST";
}

pub const DEFAULT_CONFIG_PATH: &str = "config/base.json";

pub mod prod {
    pub const APP_ADDRESS: &str = "0.0.0.0:3000";
    pub const JWT_COOKIE_NAME: &str = "jwt";

    pub mod email_client {
        use std::time::Duration;

        pub const BASE_URL: &str = "https://api.postmarkapp.com/";
        pub const TIMEOUT: Duration = Duration::from_secs(10);
    }
}

pub mod test {
    pub const APP_ADDRESS: &str = "127.0.0.1:0";

    pub mod email_client {
        use std::time::Duration;

        pub const SENDER: &str = "test@email.com";
        pub const TIMEOUT: Duration = Duration::from_millis(200);
    }
}
