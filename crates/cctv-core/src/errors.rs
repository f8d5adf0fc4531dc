use thiserror::Error;

#[derive(Error, Debug)]
pub enum CctvError {
    #[error("Configuration invalid: {reason}")]
    ConfigurationInvalid { reason: String },

    #[error("Decoder error: {0}")]
    Decoder(#[from] DecoderError),

    #[error("Malformed configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum DecoderError {
    #[error("Codec unavailable in this build: {codec}")]
    CodecUnavailable { codec: &'static str },

    #[error("Failed to decode frame: {reason}")]
    DecodeFailed { reason: String },

    #[error("Nothing to decode (empty input)")]
    EmptyInput,
}
