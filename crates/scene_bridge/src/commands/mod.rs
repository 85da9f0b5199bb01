//! JSON request surface: a closed set of tagged operations, each with its
//! own parameter struct, and a router that answers one line at a time.

mod operation;
mod router;

pub use operation::{
    decode_request, GetPropertiesParams, Operation, OperationKind, RequestError,
    SetPropertiesParams, TargetParams,
};
pub use router::{
    CommandRouter, ErrorBody, HistoryReport, MembersReport, PropertiesReport, Response,
    ResponseBody, RouterError, DEFAULT_DIAGNOSTIC_LIMIT, DEFAULT_HISTORY_LIMIT,
};
