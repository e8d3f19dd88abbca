// SPDX-License-Identifier: MIT

//! Well-known partition type GUIDs.
//!
//! Recognized for classification only; nothing in validation or repair
//! depends on the type of a used entry.

use crate::guid::Guid;

define_partition_types! {
    UNUSED => "Unused entry", Guid::ZERO,
    EFI => "EFI System Partition",
        Guid::from_fields(0xC12A7328, 0xF81F, 0x11D2, 0xBA, 0x4B, [0x00, 0xA0, 0xC9, 0x3E, 0xC9, 0x3B]),
    CHROMEOS_KERNEL => "ChromeOS kernel",
        Guid::from_fields(0xFE3A2A5D, 0x4F32, 0x41A7, 0xB7, 0x25, [0xAC, 0xCC, 0x32, 0x85, 0xA3, 0x09]),
    CHROMEOS_ROOTFS => "ChromeOS rootfs",
        Guid::from_fields(0x3CB8E202, 0x3B7E, 0x47DD, 0x8A, 0x3C, [0x7F, 0xF2, 0xA1, 0x3C, 0xFC, 0xEC]),
    CHROMEOS_RESERVED => "ChromeOS reserved",
        Guid::from_fields(0x2E0A753D, 0x9E48, 0x43B0, 0x83, 0x37, [0xB1, 0x51, 0x92, 0xCB, 0x1B, 0x5E]),
}
