use hex_literal::hex;

use crate::emmc::proto::r6_status;
use crate::emmc::{CardState, CardType, Cid, Csd, FileFormat, Scr, Support};

/// CSD words as the host hands them over: the CRC byte is gone and
/// everything sits one byte lower.
fn csd(bytes: [u8; 15]) -> Csd {
    let mut padded = [0u8; 16];
    padded[1..].copy_from_slice(&bytes);
    let mut csd = Csd::default();
    for (word, chunk) in csd.data.iter_mut().zip(padded.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    csd
}

#[test]
fn csd_v1_capacity() {
    let csd = csd(hex!("00 26 00 32 5F 59 83 C8 AD DB CF FF D2 40 40"));
    assert_eq!(csd.csd_structure(), Csd::STRUCTURE_V1);
    assert_eq!(csd.read_bl_len(), 9);
    assert_eq!(csd.c_size_v1(), 3874);
    assert_eq!(csd.c_size_mult_v1(), 7);
    assert_eq!(csd.card_capacity_bytes(), 1_015_808_000);
    assert_eq!(csd.transfer_speed(), 0x32);
    assert_eq!(csd.command_classes(), 0x5f5);
    assert_eq!(csd.write_bl_len(), 9);
    assert!(csd.erase_single_block_enabled());
    assert!(!csd.permanent_write_protect());
    assert!(!csd.temporary_write_protect());
    assert_eq!(csd.file_format(), FileFormat::Hdd);
}

#[test]
fn csd_v2_capacity() {
    let csd = csd(hex!("40 0E 00 32 5B 59 00 00 1D 69 7F 80 0A 40 00"));
    assert_eq!(csd.csd_structure(), 1);
    assert_eq!(csd.c_size_v2(), 7529);
    assert_eq!(csd.card_capacity_bytes(), 3_947_888_640);
    assert!(csd.erase_single_block_enabled());
    assert_eq!(csd.erase_sector_size(), 0x7f);
    assert_eq!(csd.file_format(), FileFormat::Hdd);
}

#[test]
fn csd_file_formats() {
    let mut csd = csd(hex!("40 0E 00 32 5B 59 00 00 1D 69 7F 80 0A 40 00"));
    let formats = [
        FileFormat::Hdd,
        FileFormat::DosFat,
        FileFormat::Uff,
        FileFormat::Unknown,
    ];
    for (bits, format) in formats.iter().enumerate() {
        csd.data[3] = (csd.data[3] & !0xc) | ((bits as u32) << 2);
        assert_eq!(csd.file_format(), *format);
    }
    assert!(FileFormat::Hdd.is_supported());
    assert!(FileFormat::DosFat.is_supported());
    assert!(!FileFormat::Uff.is_supported());
    assert!(!FileFormat::Unknown.is_supported());
}

#[test]
fn cid_fields() {
    let bytes = hex!("00 03 53 44 53 55 30 38 47 80 12 34 56 78 00 D6");
    let mut cid = Cid::default();
    for (word, chunk) in cid.data.iter_mut().zip(bytes.chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    assert_eq!(cid.manufacturer_id(), 0x03);
    assert_eq!(cid.oem_id(), 0x5344);
    assert_eq!(&cid.product_name(), b"SU08G");
    assert_eq!(cid.product_revision(), 0x80);
    assert_eq!(cid.serial_number(), 0x1234_5678);
    assert_eq!(cid.manufacturing_year(), 2013);
    assert_eq!(cid.manufacturing_month(), 6);
}

#[test]
fn scr_support() {
    let scr = Scr {
        data: [0x0200_0502, 0],
    };
    assert_eq!(scr.sd_spec(), 2);
    assert_eq!(scr.scr_structure(), 0);
    assert_eq!(
        scr.support(),
        Support::BUS_WIDTH_1 | Support::BUS_WIDTH_4 | Support::SET_BLOCK_COUNT
    );

    let scr = Scr {
        data: [0x0100_0100, 0xffff_ffff],
    };
    assert_eq!(scr.support(), Support::BUS_WIDTH_1 | Support::SPEED_CLASS);
}

#[test]
fn card_addressing() {
    let mut card = CardState::default();
    assert_eq!(card.block_address(1_048_576), Some(1_048_576));
    assert_eq!(card.block_stride(), 512);

    card.card_type = Some(CardType::Sd2Sc);
    assert_eq!(card.block_address(0xffff_ffff), Some(0xffff_ffff));
    assert_eq!(card.block_address(0x1_0000_0000), None);

    card.card_type = Some(CardType::Sd2Hc);
    assert_eq!(card.block_address(1_048_576), Some(2_048));
    assert_eq!(card.block_address(0x1_0000_0000), Some(0x0080_0000));
    assert_eq!(card.block_stride(), 1);

    card.rca = 0xb368;
    assert_eq!(card.rca_arg(), 0xb368_0000);
}

#[test]
fn r6_status_bits() {
    // Bits 15, 14 and 13 move to 23, 22 and 19; the rest keep their place.
    assert_eq!(r6_status(0xb368_e500), 0x00c8_0500);
    assert_eq!(r6_status(0x0000_1fff), 0x0000_1fff);
    assert_eq!(r6_status(0x0000_2000), 0x0008_0000);
    assert_eq!(r6_status(0xffff_0000), 0);
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
