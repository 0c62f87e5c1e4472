//! Valid attribute names per statement kind.
//! 各语句种类的合法属性名。
//!
//! Names are upper-case and matched case-insensitively. The order is the
//! canonical rendering order.

pub const PROPERTY: &[&str] = &["NAME", "TYPE", "DEFAULT", "MIN", "MAX", "PATTERN"];

pub const COMPONENT: &[&str] = &[
    "EXTENDS",
    "IMPLEMENTS",
    "OUTPUT",
    "DISPLAYNAME",
    "HINT",
    "ACCESSORS",
    "PERSISTENT",
    "SERIALIZABLE",
    "ALIAS",
    "BINDINGNAME",
    "NAMESPACE",
    "PORTTYPENAME",
    "SERVICEPORTNAME",
    "STYLE",
    "WSDLFILE",
    "MAPPEDSUPERCLASS",
    "TABLE",
    "ENTITYNAME",
    "DATASOURCE",
    "CACHEUSE",
    "CACHENAME",
    "READONLY",
    "DYNAMICINSERT",
    "DYNAMICUPDATE",
    "BATCHSIZE",
    "LAZY",
    "OPTIMISTICLOCK",
    "SCHEMA",
    "CATALOG",
    "DISCRIMINATORVALUE",
    "DISCRIMINATORCOLUMN",
    "JOINCOLUMN",
    "EMBEDDED",
    "INITMETHOD",
    "INVOKEIMPLICITACCESSOR",
    "ABSTRACT",
    "FINAL",
];

pub const INTERFACE: &[&str] = &["EXTENDS", "DISPLAYNAME", "HINT"];

pub const FUNCTION: &[&str] = &[
    "ACCESS",
    "RETURNTYPE",
    "NAME",
    "ROLES",
    "OUTPUT",
    "DISPLAYNAME",
    "HINT",
    "DESCRIPTION",
    "RETURNFORMAT",
    "SECUREJSON",
    "VERIFYCLIENT",
    "CACHEDWITHIN",
];

pub const LOCK: &[&str] = &["NAME", "SCOPE", "TIMEOUT", "TYPE", "THROWONTIMEOUT"];

pub const TRANSACTION: &[&str] = &["ACTION", "ISOLATION", "SAVEPOINT", "NESTED"];

pub const THREAD: &[&str] = &["NAME", "ACTION", "PRIORITY", "TIMEOUT", "DURATION"];

pub const SAVECONTENT: &[&str] = &["VARIABLE", "APPEND"];

pub const PARAM: &[&str] = &[
    "NAME",
    "TYPE",
    "DEFAULT",
    "MIN",
    "MAX",
    "PATTERN",
    "MAXLENGTH",
];

pub const SETTING: &[&str] = &["ENABLECFOUTPUTONLY", "REQUESTTIMEOUT", "SHOWDEBUGOUTPUT"];

pub const LOCATION: &[&str] = &["URL", "ADDTOKEN", "STATUSCODE"];

pub const EXIT: &[&str] = &["METHOD"];

/// Case-insensitive membership test.
pub fn contains(set: &[&str], name: &str) -> bool {
    set.iter().any(|v| v.eq_ignore_ascii_case(name))
}
