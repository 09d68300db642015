/// Prefix of a single CIFSR response line
const LOCAL_ADDRESS_PREFIX: &str = "+CIFSR:";

/// Single line response of CIFSR command, e.g. `+CIFSR:APIP,"192.168.4.1"`
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum LocalAddressResponse {
    AccessPointIp([u8; 4]),
    StationIp([u8; 4]),
    AccessPointMac([u8; 6]),
    StationMac([u8; 6]),
}

impl LocalAddressResponse {
    /// Parses a CIFSR line. Returns None for other lines, unknown address types or malformed addresses.
    pub fn parse(line: &str) -> Option<Self> {
        let (address_type, address) = line.strip_prefix(LOCAL_ADDRESS_PREFIX)?.split_once(',')?;

        match address_type {
            "APIP" => Some(Self::AccessPointIp(parse_ipv4(address)?)),
            "STAIP" => Some(Self::StationIp(parse_ipv4(address)?)),
            "APMAC" => Some(Self::AccessPointMac(parse_mac(address)?)),
            "STAMAC" => Some(Self::StationMac(parse_mac(address)?)),
            _ => None,
        }
    }
}

/// Reads the first four runs of decimal digits as octets. Any non-digit acts as separator.
pub(crate) fn parse_ipv4(text: &str) -> Option<[u8; 4]> {
    let mut octets = [0x0; 4];
    let mut runs = text.split(|c: char| !c.is_ascii_digit()).filter(|run| !run.is_empty());

    for octet in octets.iter_mut() {
        *octet = runs.next()?.parse().ok()?;
    }

    Some(octets)
}

/// Reads six pairs of hex digits, each pair followed by one skipped separator character.
/// A leading quote is ignored.
pub(crate) fn parse_mac(text: &str) -> Option<[u8; 6]> {
    let bytes = text.as_bytes();
    let bytes = bytes.strip_prefix(b"\"").unwrap_or(bytes);
    let mut mac = [0x0; 6];

    for (index, byte) in mac.iter_mut().enumerate() {
        let position = index * 3;
        let high = base16::decode_byte(*bytes.get(position)?)?;
        let low = base16::decode_byte(*bytes.get(position + 1)?)?;
        *byte = (high << 4) | low;
    }

    Some(mac)
}
