#![forbid(unsafe_code)]

pub use firma_c14n as c14n;
pub use firma_core as core;
pub use firma_crypto as crypto;
pub use firma_dsig as dsig;
pub use firma_keys as keys;
pub use firma_pkcs12 as pkcs12;
pub use firma_transforms as transforms;
pub use firma_xml as xml;

pub use firma_dsig::sign_invoice;
