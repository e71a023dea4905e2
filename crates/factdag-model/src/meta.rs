//! Built-in attributes.
//!
//! Schema attributes describe every attribute (including themselves) as an
//! entity. Instance attributes describe the database instance. The tombstone
//! attribute marks deleted entities.

use factdag_types::DataType;

use crate::attr::Attr;

const ATTR_NS: &[&str] = &["factdag", "attr"];
const INSTANCE_NS: &[&str] = &["factdag", "instance"];
const API_NS: &[&str] = &["factdag", "api"];

/// `factdag.attr/name`: the attribute's canonical key. Unique.
pub fn name() -> Attr {
    Attr::builtin_scalar(ATTR_NS, "name", DataType::Str).unique()
}

/// `factdag.attr/type`: the data type code.
pub fn data_type() -> Attr {
    Attr::builtin_scalar(ATTR_NS, "type", DataType::Byte)
}

/// `factdag.attr/unique`
pub fn unique() -> Attr {
    Attr::builtin_scalar(ATTR_NS, "unique", DataType::Bool)
}

/// `factdag.attr/list`
pub fn list() -> Attr {
    Attr::builtin_scalar(ATTR_NS, "list", DataType::Bool)
}

/// `factdag.instance/iid`: the instance id minting entity ids.
pub fn iid() -> Attr {
    Attr::builtin_scalar(INSTANCE_NS, "iid", DataType::Long).unique()
}

/// `factdag.instance/forks`: number of instances forked from this one.
pub fn forks() -> Attr {
    Attr::builtin_scalar(INSTANCE_NS, "forks", DataType::Int)
}

/// `factdag.instance/next-eid`: next free instance-local sequence number.
pub fn next_eid() -> Attr {
    Attr::builtin_scalar(INSTANCE_NS, "next-eid", DataType::Long)
}

/// `factdag.api/tombstone`
pub fn tombstone() -> Attr {
    Attr::builtin_scalar(API_NS, "tombstone", DataType::Bool)
}

/// Every built-in attribute, in bootstrap order.
pub fn builtin_attrs() -> Vec<Attr> {
    vec![
        name(),
        data_type(),
        unique(),
        list(),
        iid(),
        forks(),
        next_eid(),
        tombstone(),
    ]
}
