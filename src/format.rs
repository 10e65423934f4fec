pub mod binutil;
pub mod compressed;
pub mod external;
pub mod pathutil;
pub mod standalone;
pub mod type_prober;
