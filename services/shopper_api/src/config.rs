use std::path::PathBuf;

use clap::Parser;

pub const MAX_IMAGE_BYTES: usize = 12 * 1024 * 1024;

#[derive(Parser, Debug, Clone)]
#[command(name = "shopper_api", about = "Photo upload, quotes and shipping for the personal-shopper service")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "SHOPPER_BIND", default_value = "0.0.0.0:8787")]
    pub bind: String,

    /// Root folder for uploaded images (one sub-folder per order id)
    #[arg(long, env = "SHOPPER_UPLOAD_DIR", default_value = "public/uploads")]
    pub upload_dir: PathBuf,

    /// Folder holding one JSON record per order
    #[arg(long, env = "SHOPPER_STATE_DIR", default_value = "data/orders")]
    pub state_dir: PathBuf,

    /// Public URL used in the links sent to customers
    #[arg(long, env = "SHOPPER_BASE_URL", default_value = "http://127.0.0.1:8787")]
    pub base_url: String,

    #[arg(long, env = "SHOPPER_NAME", default_value = "Sabi Personal Shopper")]
    pub shop_name: String,

    /// WhatsApp number receiving new customer requests
    #[arg(long, env = "SHOPPER_WHATSAPP", default_value = "2250788655341")]
    pub shop_phone: String,

    /// Largest single image accepted, in bytes
    #[arg(long, env = "SHOPPER_MAX_IMAGE_BYTES", default_value_t = MAX_IMAGE_BYTES)]
    pub max_image_bytes: usize,

    /// Largest upload request body, in bytes
    #[arg(long, env = "SHOPPER_MAX_BODY_BYTES", default_value_t = 256 * 1024 * 1024)]
    pub max_body_bytes: usize,

    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_filter: String,
}

#[cfg(test)]
impl Config {
    /// Defaults with storage rooted somewhere else.
    pub fn rooted_at(root: &std::path::Path) -> Self {
        Config {
            bind: "127.0.0.1:0".into(),
            upload_dir: root.join("uploads"),
            state_dir: root.join("orders"),
            base_url: "https://shop.example".into(),
            shop_name: "Sabi Personal Shopper".into(),
            shop_phone: "2250788655341".into(),
            max_image_bytes: MAX_IMAGE_BYTES,
            max_body_bytes: 256 * 1024 * 1024,
            log_filter: "info".into(),
        }
    }
}
