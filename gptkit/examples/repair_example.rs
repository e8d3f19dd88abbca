// cargo run -p gptkit --example repair_example
use diskio::prelude::*;
use gptkit::guids;
use gptkit::{GptEntry, GptLayout, Guid, SyncOptions, sync_gpt, write_gpt};

fn main() {
    let sector = 512u64;
    let total = 20_000u64; // ~10 MiB
    let mut buf = vec![0u8; (sector * total) as usize];
    let mut io = MemDiskIO::new(&mut buf);

    let esp = GptEntry::new(
        guids::GPT_ENT_TYPE_EFI,
        Guid::from_bytes([1; 16]),
        2048,
        4095,
        0,
        "ESP",
    );
    let kern = GptEntry::new(
        guids::GPT_ENT_TYPE_CHROMEOS_KERNEL,
        Guid::from_bytes([2; 16]),
        4096,
        9999,
        0,
        "KERN-A",
    );

    let layout = GptLayout::new(total, Guid::from_bytes([0xAB; 16]));
    write_gpt(&mut io, &layout, &[esp, kern]).expect("gpt write failed");

    // Smash the primary header.
    io.zero_fill(sector, sector as usize).expect("zero fill failed");

    let report = sync_gpt(&mut io, &SyncOptions::new()).expect("sync failed");
    println!("{} (repaired: {})", report.outcome(), report.repaired);

    let report = sync_gpt(&mut io, &SyncOptions::new()).expect("sync failed");
    println!("{} (healthy: {})", report.outcome(), report.is_healthy());
}
