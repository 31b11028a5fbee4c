use serde::de::DeserializeOwned;
use serde::Serialize;

use switchboard_core::{BoxError, Error};

use crate::{HttpRequest, HttpResponse};

pub mod registry;

pub use self::registry::CodecRegistry;

/// Self-describing intermediate form exchanged between codecs and payloads.
///
/// A codec parses its wire envelope into documents and renders documents back
/// out; the typed conversion happens on the payload side.
pub type Document = serde_json::Value;

/// Codec trait for creating a per-request decoder/encoder
///
/// One codec handles one serialization scheme (JSON, XML, ...) and is chosen
/// from the request's `Content-Type`.
pub trait Codec: Send + Sync {
    /// Create the request-scoped decoder/encoder bound to `request`
    fn new_request(&self, request: &HttpRequest) -> Box<dyn CodecRequest>;
}

/// Decodes one request and encodes its response
pub trait CodecRequest: Send {
    /// Read the request and return the dotted RPC method name
    fn method(&mut self) -> Result<String, BoxError>;

    /// Read the request, filling the method arguments
    fn read_request(&mut self, args: &mut dyn ArgsBuffer) -> Result<(), BoxError>;

    /// Write a successful response carrying `reply`
    fn write_response(
        &mut self,
        response: &mut HttpResponse,
        reply: &dyn ReplyBuffer,
    ) -> Result<(), BoxError>;

    /// Write an error response
    ///
    /// The status line has already been set; implementations only shape the
    /// envelope.
    fn write_error_response(&mut self, response: &mut HttpResponse, error: &Error);
}

/// Argument buffer a codec request decodes into
pub trait ArgsBuffer: Send {
    /// Replace the buffer's contents with `document`
    ///
    /// A `null` document leaves the freshly defaulted buffer untouched.
    fn populate(&mut self, document: Document) -> Result<(), serde_json::Error>;
}

impl<T> ArgsBuffer for T
where
    T: DeserializeOwned + Send,
{
    fn populate(&mut self, document: Document) -> Result<(), serde_json::Error> {
        if !document.is_null() {
            *self = serde_json::from_value(document)?;
        }
        Ok(())
    }
}

/// Reply buffer a codec request encodes from
pub trait ReplyBuffer: Send {
    /// Render the reply as a document
    fn to_document(&self) -> Result<Document, serde_json::Error>;
}

impl<T> ReplyBuffer for T
where
    T: Serialize + Send,
{
    fn to_document(&self) -> Result<Document, serde_json::Error> {
        serde_json::to_value(self)
    }
}
