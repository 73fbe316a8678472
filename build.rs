fn main() {
    // XOR key for obfuscation (16 bytes)
    const XOR_KEY: [u8; 16] = [
        0x4f, 0x72, 0x61, 0x6e, 0x67, 0x65, 0x50, 0x69, 0x6e, 0x65, 0x61, 0x70, 0x70, 0x6c, 0x65,
        0x21,
    ];

    // An arena build may ship with a Gemini key baked in
    let embedded = std::env::var("GEMINI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
        .map(|key| {
            key.bytes()
                .enumerate()
                .map(|(i, b)| format!("{:02x}", b ^ XOR_KEY[i % XOR_KEY.len()]))
                .collect::<String>()
        });

    match embedded {
        Some(hex_encoded) => {
            println!("cargo:rustc-env=OBFUSCATED_GEMINI_KEY={}", hex_encoded);
            println!("cargo:rustc-env=HAS_BUILTIN_KEY=1");
        }
        None => {
            println!("cargo:rustc-env=OBFUSCATED_GEMINI_KEY=");
            println!("cargo:rustc-env=HAS_BUILTIN_KEY=0");
        }
    }

    println!("cargo:rerun-if-env-changed=GEMINI_API_KEY");
}
