//! TypeScript runtime helper fragments.
//!
//! camelCase spellings of the shared helper contract. Every fragment is
//! self-contained; the emitter includes exactly the registered ones.

/// Helper body by registered name.
pub fn fragment(name: &str) -> Option<&'static str> {
    let text = match name {
        "rotl8" => {
            "function rotl8(v: number, n: number): number {\n  n &= 7;\n  return ((v << n) | (v >>> (8 - n))) & 0xFF;\n}\n"
        }
        "rotr8" => {
            "function rotr8(v: number, n: number): number {\n  n &= 7;\n  return ((v >>> n) | (v << (8 - n))) & 0xFF;\n}\n"
        }
        "rotl16" => {
            "function rotl16(v: number, n: number): number {\n  n &= 15;\n  return ((v << n) | (v >>> (16 - n))) & 0xFFFF;\n}\n"
        }
        "rotr16" => {
            "function rotr16(v: number, n: number): number {\n  n &= 15;\n  return ((v >>> n) | (v << (16 - n))) & 0xFFFF;\n}\n"
        }
        "rotl32" => {
            "function rotl32(v: number, n: number): number {\n  n &= 31;\n  return ((v << n) | (v >>> (32 - n))) >>> 0;\n}\n"
        }
        "rotr32" => {
            "function rotr32(v: number, n: number): number {\n  n &= 31;\n  return ((v >>> n) | (v << (32 - n))) >>> 0;\n}\n"
        }
        "rotl64" => {
            "function rotl64(v: bigint, n: bigint): bigint {\n  n &= 63n;\n  const mask = 0xFFFFFFFFFFFFFFFFn;\n  return (((v << n) | (v >> (64n - n))) & mask);\n}\n"
        }
        "rotr64" => {
            "function rotr64(v: bigint, n: bigint): bigint {\n  n &= 63n;\n  const mask = 0xFFFFFFFFFFFFFFFFn;\n  return (((v >> n) | (v << (64n - n))) & mask);\n}\n"
        }
        "pack8" => "function pack8(b0: number): number {\n  return b0 & 0xFF;\n}\n",
        "unpack8" => "function unpack8(v: number): number[] {\n  return [v & 0xFF];\n}\n",
        "pack16BE" => {
            "function pack16BE(b0: number, b1: number): number {\n  return (((b0 & 0xFF) << 8) | (b1 & 0xFF)) >>> 0;\n}\n"
        }
        "pack16LE" => {
            "function pack16LE(b0: number, b1: number): number {\n  return (((b1 & 0xFF) << 8) | (b0 & 0xFF)) >>> 0;\n}\n"
        }
        "pack32BE" => {
            "function pack32BE(b0: number, b1: number, b2: number, b3: number): number {\n  return (((b0 & 0xFF) << 24) | ((b1 & 0xFF) << 16) | ((b2 & 0xFF) << 8) | (b3 & 0xFF)) >>> 0;\n}\n"
        }
        "pack32LE" => {
            "function pack32LE(b0: number, b1: number, b2: number, b3: number): number {\n  return (((b3 & 0xFF) << 24) | ((b2 & 0xFF) << 16) | ((b1 & 0xFF) << 8) | (b0 & 0xFF)) >>> 0;\n}\n"
        }
        "pack64BE" => {
            "function pack64BE(...bytes: number[]): bigint {\n  let v = 0n;\n  for (const b of bytes) {\n    v = (v << 8n) | BigInt(b & 0xFF);\n  }\n  return v;\n}\n"
        }
        "pack64LE" => {
            "function pack64LE(...bytes: number[]): bigint {\n  let v = 0n;\n  for (let i = bytes.length - 1; i >= 0; i--) {\n    v = (v << 8n) | BigInt(bytes[i] & 0xFF);\n  }\n  return v;\n}\n"
        }
        "unpack16BE" => {
            "function unpack16BE(v: number): number[] {\n  return [(v >>> 8) & 0xFF, v & 0xFF];\n}\n"
        }
        "unpack16LE" => {
            "function unpack16LE(v: number): number[] {\n  return [v & 0xFF, (v >>> 8) & 0xFF];\n}\n"
        }
        "unpack32BE" => {
            "function unpack32BE(v: number): number[] {\n  return [(v >>> 24) & 0xFF, (v >>> 16) & 0xFF, (v >>> 8) & 0xFF, v & 0xFF];\n}\n"
        }
        "unpack32LE" => {
            "function unpack32LE(v: number): number[] {\n  return [v & 0xFF, (v >>> 8) & 0xFF, (v >>> 16) & 0xFF, (v >>> 24) & 0xFF];\n}\n"
        }
        "unpack64BE" => {
            "function unpack64BE(v: bigint): number[] {\n  const out: number[] = [];\n  for (let i = 7; i >= 0; i--) {\n    out.push(Number((v >> BigInt(i * 8)) & 0xFFn));\n  }\n  return out;\n}\n"
        }
        "unpack64LE" => {
            "function unpack64LE(v: bigint): number[] {\n  const out: number[] = [];\n  for (let i = 0; i < 8; i++) {\n    out.push(Number((v >> BigInt(i * 8)) & 0xFFn));\n  }\n  return out;\n}\n"
        }
        "hexToBytes" => {
            "function hexToBytes(hex: string): number[] {\n  const out: number[] = [];\n  for (let i = 0; i + 1 < hex.length; i += 2) {\n    out.push(parseInt(hex.substring(i, i + 2), 16));\n  }\n  return out;\n}\n"
        }
        "bytesToHex" => {
            "function bytesToHex(bytes: number[]): string {\n  return bytes.map(b => (b & 0xFF).toString(16).padStart(2, \"0\")).join(\"\");\n}\n"
        }
        "secureCompare" => {
            "function secureCompare(a: number[], b: number[]): boolean {\n  if (a.length !== b.length) {\n    return false;\n  }\n  let diff = 0;\n  for (let i = 0; i < a.length; i++) {\n    diff |= a[i] ^ b[i];\n  }\n  return diff === 0;\n}\n"
        }
        "xorArrays" => {
            "function xorArrays(a: number[], b: number[]): number[] {\n  const out: number[] = [];\n  for (let i = 0; i < Math.min(a.length, b.length); i++) {\n    out.push((a[i] ^ b[i]) & 0xFF);\n  }\n  return out;\n}\n"
        }
        "copyArray" => {
            "function copyArray<T>(a: T[]): T[] {\n  return a.slice();\n}\n"
        }
        "concatArrays" => {
            "function concatArrays<T>(...arrays: T[][]): T[] {\n  return ([] as T[]).concat(...arrays);\n}\n"
        }
        "clearArray" => {
            "function clearArray(a: number[]): void {\n  a.fill(0);\n}\n"
        }
        "stringToBytes" => {
            "function stringToBytes(s: string): number[] {\n  const out: number[] = [];\n  for (let i = 0; i < s.length; i++) {\n    out.push(s.charCodeAt(i) & 0xFF);\n  }\n  return out;\n}\n"
        }
        "bytesToString" => {
            "function bytesToString(bytes: number[]): string {\n  return String.fromCharCode(...bytes);\n}\n"
        }
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_names_are_present() {
        for width in [8, 16, 32, 64] {
            assert!(fragment(&format!("rotl{width}")).is_some());
            assert!(fragment(&format!("rotr{width}")).is_some());
        }
        for width in [16, 32, 64] {
            for endian in ["BE", "LE"] {
                assert!(fragment(&format!("pack{width}{endian}")).is_some());
                assert!(fragment(&format!("unpack{width}{endian}")).is_some());
            }
        }
        for name in [
            "hexToBytes",
            "bytesToHex",
            "secureCompare",
            "xorArrays",
            "copyArray",
            "concatArrays",
            "clearArray",
        ] {
            assert!(fragment(name).is_some(), "missing fragment {name}");
        }
    }

    #[test]
    fn test_rotl32_truncates_with_zero_fill_shift() {
        let body = fragment("rotl32").unwrap();
        assert!(body.contains(">>> 0"));
    }
}
