//! Resource reference resolution for single-file HTML output.
//!
//! This crate provides:
//! - [`ImageSource`] — classification of an `img` `src` value
//! - [`source`] — local file reads, MIME mapping, and `data:` URI encoding
//! - [`remote`] — the HTTP fetcher used for remote images
//!
//! Nothing here touches a document tree; callers decide what to do with the
//! resolved data URIs (or with a `MissingReference` error).

pub mod remote;
pub mod source;

pub use remote::RemoteFetcher;
pub use source::{
    ImageSource, encode_data_uri, file_href_to_path, image_mime, is_file_href, load_local_image,
    read_stylesheet,
};
