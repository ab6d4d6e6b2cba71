//! SNTP request and response handling
//!
//! Only the client side of a single unicast query (RFC 4330): build the
//! 48-byte request, then pull the transmit timestamp out of the reply.

/// SNTP packet size without extensions
pub const PACKET_LEN: usize = 48;

/// Server UDP port
pub const NTP_PORT: u16 = 123;

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970)
pub const NTP_UNIX_OFFSET: u32 = 2_208_988_800;

/// LI = 0, VN = 3, Mode = 3 (client)
const CLIENT_HEADER: u8 = 0x1B;

/// Mode field value for server replies
const MODE_SERVER: u8 = 4;

/// Offset of the transmit timestamp seconds
const TRANSMIT_SECS: usize = 40;

/// Reasons a reply is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SntpError {
    /// Fewer than 48 bytes
    TooShort,
    /// Not a server-mode packet
    NotServerReply,
    /// Stratum 0: the server told us to go away
    KissOfDeath,
    /// Transmit timestamp missing
    NoTimestamp,
}

/// Build a client request packet
pub const fn request() -> [u8; PACKET_LEN] {
    let mut packet = [0u8; PACKET_LEN];
    packet[0] = CLIENT_HEADER;
    packet
}

/// Extract Unix seconds from a server reply
pub fn parse_reply(reply: &[u8]) -> Result<u32, SntpError> {
    if reply.len() < PACKET_LEN {
        return Err(SntpError::TooShort);
    }
    if reply[0] & 0x07 != MODE_SERVER {
        return Err(SntpError::NotServerReply);
    }
    if reply[1] == 0 {
        return Err(SntpError::KissOfDeath);
    }

    let secs = u32::from_be_bytes([
        reply[TRANSMIT_SECS],
        reply[TRANSMIT_SECS + 1],
        reply[TRANSMIT_SECS + 2],
        reply[TRANSMIT_SECS + 3],
    ]);
    if secs == 0 {
        return Err(SntpError::NoTimestamp);
    }

    // Wrapping keeps era 1 (after 2036) correct until 2106
    Ok(secs.wrapping_sub(NTP_UNIX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply_with(secs: u32) -> [u8; PACKET_LEN] {
        let mut reply = [0u8; PACKET_LEN];
        reply[0] = 0x24; // LI 0, VN 4, mode 4
        reply[1] = 2;
        reply[40..44].copy_from_slice(&secs.to_be_bytes());
        reply
    }

    #[test]
    fn test_request_header() {
        let packet = request();
        assert_eq!(packet[0], 0x1B);
        assert!(packet[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_parse_reply() {
        // 2024-01-01T00:00:00Z
        let reply = reply_with(1_704_067_200 + NTP_UNIX_OFFSET);
        assert_eq!(parse_reply(&reply), Ok(1_704_067_200));
    }

    #[test]
    fn test_reject_bad_replies() {
        assert_eq!(parse_reply(&[0u8; 47]), Err(SntpError::TooShort));

        let mut reply = reply_with(3_913_056_000);
        reply[0] = 0x1B;
        assert_eq!(parse_reply(&reply), Err(SntpError::NotServerReply));

        let mut reply = reply_with(3_913_056_000);
        reply[1] = 0;
        assert_eq!(parse_reply(&reply), Err(SntpError::KissOfDeath));

        assert_eq!(parse_reply(&reply_with(0)), Err(SntpError::NoTimestamp));
    }

    #[test]
    fn test_era_rollover() {
        // NTP seconds wrapped past 2036; Unix time keeps counting
        let reply = reply_with(100);
        assert_eq!(parse_reply(&reply), Ok(100u32.wrapping_sub(NTP_UNIX_OFFSET)));
        assert!(parse_reply(&reply).unwrap() > 2_085_978_496);
    }
}
