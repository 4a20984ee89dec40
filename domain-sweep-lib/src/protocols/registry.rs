//! TLD to RDAP endpoint mappings.
//!
//! Suffixes without a known endpoint are looked up over WHOIS instead.

use std::collections::HashMap;

lazy_static::lazy_static! {
    static ref RDAP_ENDPOINTS: HashMap<&'static str, &'static str> = HashMap::from([
        // Popular gTLDs
        ("com", "https://rdap.verisign.com/com/v1/domain/"),
        ("net", "https://rdap.verisign.com/net/v1/domain/"),
        ("org", "https://rdap.publicinterestregistry.org/rdap/domain/"),
        ("info", "https://rdap.identitydigital.services/rdap/domain/"),
        ("biz", "https://rdap.nic.biz/domain/"),
        // Google TLDs
        ("app", "https://pubapi.registry.google/rdap/domain/"),
        ("dev", "https://pubapi.registry.google/rdap/domain/"),
        ("page", "https://pubapi.registry.google/rdap/domain/"),
        // CentralNic managed gTLDs
        ("xyz", "https://rdap.centralnic.com/xyz/domain/"),
        ("tech", "https://rdap.centralnic.com/tech/domain/"),
        ("online", "https://rdap.centralnic.com/online/domain/"),
        ("site", "https://rdap.centralnic.com/site/domain/"),
        ("website", "https://rdap.centralnic.com/website/domain/"),
        // Identity Digital managed TLDs
        ("ai", "https://rdap.identitydigital.services/rdap/domain/"),
        ("io", "https://rdap.identitydigital.services/rdap/domain/"),
        ("me", "https://rdap.identitydigital.services/rdap/domain/"),
        ("zone", "https://rdap.identitydigital.services/rdap/domain/"),
        ("digital", "https://rdap.identitydigital.services/rdap/domain/"),
        // ccTLDs with working RDAP endpoints
        ("us", "https://rdap.nic.us/domain/"),
        ("uk", "https://rdap.nominet.uk/domain/"),
        ("de", "https://rdap.denic.de/domain/"),
        ("ca", "https://rdap.ca.fury.ca/rdap/domain/"),
        ("au", "https://rdap.cctld.au/rdap/domain/"),
        ("fr", "https://rdap.nic.fr/domain/"),
        ("nl", "https://rdap.sidn.nl/domain/"),
        ("br", "https://rdap.registro.br/domain/"),
        ("in", "https://rdap.nixiregistry.in/rdap/domain/"),
        ("tv", "https://rdap.nic.tv/domain/"),
        ("cc", "https://tld-rdap.verisign.com/cc/v1/domain/"),
        ("cloud", "https://rdap.registry.cloud/rdap/domain/"),
        // NOTE: co, eu, it, jp, es, cn have no working RDAP endpoint and go to WHOIS.
    ]);
}

/// RDAP base URL for a TLD, if one is known.
pub fn get_rdap_endpoint(tld: &str) -> Option<&'static str> {
    RDAP_ENDPOINTS.get(tld.to_lowercase().as_str()).copied()
}

/// All TLDs with a built-in RDAP endpoint, sorted.
pub fn get_rdap_tlds() -> Vec<&'static str> {
    let mut tlds: Vec<&'static str> = RDAP_ENDPOINTS.keys().copied().collect();
    tlds.sort_unstable();
    tlds
}
