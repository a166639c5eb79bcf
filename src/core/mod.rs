mod endpoints;
mod engine;
mod inference;
mod java;
mod linker;
mod mapper_xml;
mod model;
mod pool;
mod reader;
mod scanner;
mod schema;

pub use endpoints::extract_endpoints;
pub use engine::Engine;
pub use java::JavaParser;
pub use linker::Linker;
pub use model::{
    is_model_class, EndpointDef, Node, NodeId, NodeKind, ParamDef, ParamLocation, ResponseDef,
    Summary,
};
pub use pool::ComponentPool;
