//! Integrity checksums recorded for every linked file.
//!
//! CRC-16/ARC and CRC-32/ISO-HDLC (the zlib / PNG CRC32).

use crc::{Crc, CRC_16_ARC, CRC_32_ISO_HDLC};

const CRC16: Crc<u16> = Crc::<u16>::new(&CRC_16_ARC);
const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

pub fn crc16(data: &[u8]) -> u16 {
    CRC16.checksum(data)
}

pub fn crc32(data: &[u8]) -> u32 {
    CRC32.checksum(data)
}
