use emmc_sdhc::emmc::{clock_divisor, divider_bits, HostVersion};
use emmc_sdhc::{Block, BlockCount, BlockIdx};

const BASE_CLOCK_HZ: u32 = 250_000_000;

fn frequencies() -> impl Iterator<Item = u32> {
    (1..=500).map(|i| i * 100_000)
}

#[test]
fn v2_divisor_is_a_bounded_power_of_two() {
    for version in [HostVersion::V1, HostVersion::V2].iter() {
        for freq in frequencies() {
            let divisor = clock_divisor(*version, BASE_CLOCK_HZ, freq);
            assert!(divisor.is_power_of_two(), "{} Hz gave {}", freq, divisor);
            assert!(divisor >= 2, "{} Hz gave {}", freq, divisor);
            assert!(divisor <= 128, "{} Hz gave {}", freq, divisor);
            let closest = BASE_CLOCK_HZ / freq;
            if closest > 2 && closest <= 129 {
                assert!(divisor < closest, "{} Hz gave {}", freq, divisor);
                assert!(divisor * 2 >= closest - 1, "{} Hz gave {}", freq, divisor);
            }
        }
    }
}

#[test]
fn v3_divisor_is_the_closest() {
    for freq in frequencies() {
        let divisor = clock_divisor(HostVersion::V3, BASE_CLOCK_HZ, freq);
        let closest = BASE_CLOCK_HZ / freq;
        if closest > 2 {
            assert_eq!(divisor, closest, "{} Hz", freq);
        } else {
            assert_eq!(divisor, 2, "{} Hz", freq);
        }
    }
}

#[test]
fn known_divisors() {
    assert_eq!(clock_divisor(HostVersion::V2, 41_666_666, 400_000), 64);
    assert_eq!(clock_divisor(HostVersion::V2, 41_666_666, 25_000_000), 2);
    assert_eq!(clock_divisor(HostVersion::V2, 250_000_000, 400_000), 128);
    assert_eq!(clock_divisor(HostVersion::V3, 250_000_000, 400_000), 625);
    assert_eq!(clock_divisor(HostVersion::V3, 250_000_000, 25_000_000), 10);
    assert_eq!(clock_divisor(HostVersion::V3, 41_666_666, 25_000_000), 2);
}

#[test]
fn divider_encoding() {
    assert_eq!(divider_bits(HostVersion::V2, 64), 0x4000);
    assert_eq!(divider_bits(HostVersion::V3, 10), 0x0a00);
    // Bits 9:8 of the divisor go to bits 7:6.
    assert_eq!(divider_bits(HostVersion::V3, 625), 0x7180);
    assert_eq!(divider_bits(HostVersion::V2, 625), 0x7100);
    assert_eq!(divider_bits(HostVersion::V3, 0x3ff) & !0xffc0, 0);
}

#[test]
fn host_versions() {
    assert_eq!(HostVersion::from_slotisr_ver(0x0000_0000), HostVersion::V1);
    assert_eq!(HostVersion::from_slotisr_ver(0x9901_0000), HostVersion::V2);
    assert_eq!(HostVersion::from_slotisr_ver(0x9902_0000), HostVersion::V3);
    assert_eq!(HostVersion::from_slotisr_ver(0x0005_0000), HostVersion::V3);
}

#[test]
fn block_addresses() {
    assert_eq!(BlockIdx(2048).byte_address(), 1_048_576);
    assert_eq!(BlockIdx(1) + BlockCount(2), BlockIdx(3));
    assert_eq!(
        BlockIdx(u32::MAX).byte_address(),
        u64::from(u32::MAX) * 512
    );
    let block = Block::default();
    assert_eq!(block.len(), Block::LEN);
    assert!(block.iter().all(|b| *b == 0));
}

// ****************************************************************************
//
// End Of File
//
// ****************************************************************************
