//! Objective-C classes, protocols and categories.
//!
//! [`hierarchy`] decides which methods each managed class declares,
//! [`params`] names them, [`stret`] picks the message-send convention and
//! [`stubs`] renders the result.

pub mod hierarchy;
pub mod params;
pub mod stret;
pub mod stubs;

pub use stret::is_stret;
pub use stubs::{
    CategoryRegistry, ObjCCategoryStub, ObjCContainerStub, ObjCMethodStub, ObjCPropertyStub,
    ObjCStubBuilder, ObjCTypeStub, UNABLE_TO_IMPORT,
};
