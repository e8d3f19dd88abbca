use anyhow::{Context, Result, bail};
use gptkit::guids::*;
use gptkit::{GptEntry, Guid};

/// Random v4 GUID in on-disk byte order.
pub fn random_guid() -> Guid {
    Guid::from_bytes(uuid::Uuid::new_v4().to_bytes_le())
}

fn kind_guid(kind: &str) -> Result<Guid> {
    Ok(match kind.to_ascii_lowercase().as_str() {
        "efi" | "esp" => GPT_ENT_TYPE_EFI,
        "kernel" => GPT_ENT_TYPE_CHROMEOS_KERNEL,
        "rootfs" => GPT_ENT_TYPE_CHROMEOS_ROOTFS,
        "reserved" => GPT_ENT_TYPE_CHROMEOS_RESERVED,
        other => match uuid::Uuid::parse_str(other) {
            Ok(u) => Guid::from_bytes(u.to_bytes_le()),
            Err(_) => bail!("unknown partition type '{other}'"),
        },
    })
}

/// Parses `TYPE:START:END[:NAME]`, with TYPE one of efi, kernel, rootfs, reserved or a GUID.
pub fn parse_part(arg: &str) -> Result<GptEntry> {
    let mut it = arg.splitn(4, ':');
    let (Some(kind), Some(start), Some(end)) = (it.next(), it.next(), it.next()) else {
        bail!("partition '{arg}' must look like TYPE:START:END[:NAME]");
    };
    let name = it.next().unwrap_or(kind);

    let start: u64 = start
        .parse()
        .with_context(|| format!("bad start LBA in '{arg}'"))?;
    let end: u64 = end
        .parse()
        .with_context(|| format!("bad end LBA in '{arg}'"))?;
    if end < start {
        bail!("partition '{arg}' ends before it starts");
    }

    Ok(GptEntry::new(kind_guid(kind)?, random_guid(), start, end, 0, name))
}
