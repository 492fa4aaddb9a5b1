use goblin::{elf, mach, pe, Object};

/// Best-effort machine family of an object file: x86, x86_64, arm, arm64 or riscv.
pub fn detect_architecture(bytes: &[u8]) -> Option<String> {
    match Object::parse(bytes).ok()? {
        Object::Elf(elf) => match elf.header.e_machine {
            elf::header::EM_X86_64 => Some("x86_64".into()),
            elf::header::EM_386 => Some("x86".into()),
            elf::header::EM_AARCH64 => Some("arm64".into()),
            elf::header::EM_ARM => Some("arm".into()),
            elf::header::EM_RISCV => Some("riscv".into()),
            _ => None,
        },
        Object::PE(pe) => match pe.header.coff_header.machine {
            pe::header::COFF_MACHINE_X86 => Some("x86".into()),
            pe::header::COFF_MACHINE_X86_64 => Some("x86_64".into()),
            pe::header::COFF_MACHINE_ARM => Some("arm".into()),
            pe::header::COFF_MACHINE_ARM64 => Some("arm64".into()),
            _ => None,
        },
        Object::Mach(mach::Mach::Binary(bin)) => match bin.header.cputype() {
            mach::cputype::CPU_TYPE_X86 => Some("x86".into()),
            mach::cputype::CPU_TYPE_X86_64 => Some("x86_64".into()),
            mach::cputype::CPU_TYPE_ARM => Some("arm".into()),
            mach::cputype::CPU_TYPE_ARM64 => Some("arm64".into()),
            _ => None,
        },
        _ => None,
    }
}

/// True when a configured architecture name plausibly describes `detected`.
///
/// `x86` accepts both 32- and 64-bit x86, `arm` accepts both arm and arm64.
pub fn architecture_matches(configured: &str, detected: &str) -> bool {
    let configured = configured.to_ascii_lowercase();
    let family = |name: &str| -> &'static str {
        match name {
            n if n.starts_with("x86") || n.starts_with("i686") || n.starts_with("i386") => "x86",
            n if n.starts_with("arm") || n.starts_with("aarch64") || n.starts_with("thumb") => "arm",
            n if n.starts_with("riscv") => "riscv",
            _ => "other",
        }
    };
    let configured_family = family(configured.as_str());
    configured_family != "other" && configured_family == family(detected)
}
