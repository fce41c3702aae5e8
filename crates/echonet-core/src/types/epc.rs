//! Property codes (EPC) shared by every ECHONET Lite object, plus the node
//! profile properties used during discovery.

pub const OPERATION_STATUS: u8 = 0x80;
pub const INSTALLATION_LOCATION: u8 = 0x81;
pub const STANDARD_VERSION: u8 = 0x82;
pub const IDENTIFICATION_NUMBER: u8 = 0x83;
pub const FAULT_STATUS: u8 = 0x88;
pub const MANUFACTURER_CODE: u8 = 0x8A;
pub const PRODUCT_CODE: u8 = 0x8C;
pub const SERIAL_NUMBER: u8 = 0x8D;
pub const STATUS_ANNOUNCEMENT_MAP: u8 = 0x9D;
pub const SET_PROPERTY_MAP: u8 = 0x9E;
pub const GET_PROPERTY_MAP: u8 = 0x9F;

/// Node profile: instance list notification, sent unsolicited at boot.
pub const INSTANCE_LIST_NOTIFICATION: u8 = 0xD5;
/// Node profile: self-node instance list S.
pub const SELF_NODE_INSTANCE_LIST_S: u8 = 0xD6;
/// Node profile: self-node class list S.
pub const SELF_NODE_CLASS_LIST_S: u8 = 0xD7;

/// The three property maps, in the order they are requested.
pub const PROPERTY_MAPS: [u8; 3] = [
    STATUS_ANNOUNCEMENT_MAP,
    SET_PROPERTY_MAP,
    GET_PROPERTY_MAP,
];
