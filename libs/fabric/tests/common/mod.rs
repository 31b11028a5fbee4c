#![allow(dead_code)]

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};
use switchboard_fabric::service::{Member, Receiver};
use switchboard_fabric::{
    ArgsBuffer, BoxError, Codec, CodecRequest, HttpRequest, HttpResponse, ReplyBuffer, RpcError,
};

/// JSON-RPC 1.0 style codec: `{"method", "params", "id"}` in,
/// `{"result", "error", "id"}` out
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn new_request(&self, request: &HttpRequest) -> Box<dyn CodecRequest> {
        let envelope = serde_json::from_slice::<Envelope>(request.body()).map_err(|e| e.to_string());
        Box::new(JsonCodecRequest { envelope })
    }
}

#[derive(Deserialize)]
struct Envelope {
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

struct JsonCodecRequest {
    envelope: Result<Envelope, String>,
}

impl JsonCodecRequest {
    fn id(&self) -> Value {
        self.envelope
            .as_ref()
            .map(|envelope| envelope.id.clone())
            .unwrap_or(Value::Null)
    }
}

impl CodecRequest for JsonCodecRequest {
    fn method(&mut self) -> Result<String, BoxError> {
        match &self.envelope {
            Ok(envelope) => Ok(envelope.method.clone()),
            Err(e) => Err(e.clone().into()),
        }
    }

    fn read_request(&mut self, args: &mut dyn ArgsBuffer) -> Result<(), BoxError> {
        let envelope = self
            .envelope
            .as_mut()
            .map_err(|e| BoxError::from(e.clone()))?;
        args.populate(envelope.params.take())?;
        Ok(())
    }

    fn write_response(
        &mut self,
        response: &mut HttpResponse,
        reply: &dyn ReplyBuffer,
    ) -> Result<(), BoxError> {
        let result = reply.to_document()?;
        let body = json!({ "result": result, "error": null, "id": self.id() });
        write_json(response, &body)
    }

    fn write_error_response(&mut self, response: &mut HttpResponse, error: &RpcError) {
        let body = json!({ "result": null, "error": error.to_string(), "id": self.id() });
        let _ = write_json(response, &body);
    }
}

fn write_json(response: &mut HttpResponse, body: &Value) -> Result<(), BoxError> {
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    *response.body_mut() = Bytes::from(serde_json::to_vec(body)?);
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AddArgs {
    pub a: i64,
    pub b: i64,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddReply {
    pub sum: i64,
}

/// Reply whose serialization always fails
#[derive(Debug, Default)]
pub struct Unencodable;

impl Serialize for Unencodable {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("reply cannot be encoded"))
    }
}

pub struct Calc;

impl Calc {
    fn add(&self, args: &AddArgs, reply: &mut AddReply) -> Result<(), String> {
        reply.sum = args.a + args.b;
        Ok(())
    }

    fn fail(&self, _args: &AddArgs, _reply: &mut AddReply) -> Result<(), String> {
        Err("calculator is broken".to_string())
    }

    fn broken(&self, _args: &AddArgs, _reply: &mut Unencodable) -> Result<(), String> {
        Ok(())
    }
}

impl Receiver for Calc {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::method("Add", Calc::add),
            Member::method("Fail", Calc::fail),
            Member::method("Broken", Calc::broken),
            Member::method("add", Calc::add),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker(pub u32);

#[derive(Debug, Default, Deserialize)]
pub struct GreetArgs {
    pub name: String,
}

#[derive(Debug, Default, Serialize)]
pub struct GreetReply {
    pub greeting: String,
    pub marker: Option<u32>,
}

/// Request-aware service: echoes the `Marker` extension it was called with
pub struct Greeter;

impl Greeter {
    fn hello(
        &self,
        request: &HttpRequest,
        args: &GreetArgs,
        reply: &mut GreetReply,
    ) -> Result<(), String> {
        reply.greeting = format!("Hello, {}!", args.name);
        reply.marker = request.extensions().get::<Marker>().map(|marker| marker.0);
        Ok(())
    }

    fn shout(&self, args: &GreetArgs, reply: &mut GreetReply) -> Result<(), String> {
        reply.greeting = args.name.to_uppercase();
        Ok(())
    }
}

impl Receiver for Greeter {
    fn members() -> Vec<Member<Self>> {
        vec![
            Member::with_request("Hello", Greeter::hello),
            Member::method("Shout", Greeter::shout),
        ]
    }
}

/// Offers only unexported or mis-shaped members
pub struct Hollow;

impl Hollow {
    fn noop(&self, _args: &AddArgs, _reply: &mut AddReply) -> Result<(), String> {
        Ok(())
    }
}

impl Receiver for Hollow {
    fn members() -> Vec<Member<Self>> {
        vec![Member::method("noop", Hollow::noop)]
    }
}

/// Build a JSON-RPC request for `method`
pub fn rpc_request(method: &str, params: Value) -> HttpRequest {
    rpc_request_with_type(method, params, Some("application/json"))
}

pub fn rpc_request_with_type(
    method: &str,
    params: Value,
    content_type: Option<&str>,
) -> HttpRequest {
    let body = json!({ "method": method, "params": params, "id": 1 });
    let mut builder = http::Request::builder().method(http::Method::POST).uri("/rpc");
    if let Some(content_type) = content_type {
        builder = builder.header(CONTENT_TYPE, content_type);
    }
    builder
        .body(Bytes::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

pub fn body_json(response: &HttpResponse) -> Value {
    serde_json::from_slice(response.body()).unwrap()
}

/// Route server logs through the test harness; `RUST_LOG` picks the level
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
