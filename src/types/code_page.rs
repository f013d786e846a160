//! Drawing code pages.
//!
//! The file header stores a small index into a fixed table of code pages.
//! Strings in R13 to R2004 streams are single or double byte text in that
//! code page.

use encoding_rs::Encoding;

/// Code page index from the file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CodePage(pub u16);

impl CodePage {
    /// `ANSI_1252`, the value written by most Western installations.
    pub const ANSI_1252: CodePage = CodePage(30);

    /// Name as written in DXF `$DWGCODEPAGE`.
    pub fn name(&self) -> String {
        match self.0 {
            0 => "UTF8".to_string(),
            1 => "US_ASCII".to_string(),
            2..=10 => format!("ISO_8859_{}", self.0 - 1),
            11 => "DOS437".to_string(),
            12 => "DOS850".to_string(),
            13 => "DOS852".to_string(),
            14 => "DOS855".to_string(),
            15 => "DOS857".to_string(),
            16 => "DOS860".to_string(),
            17 => "DOS861".to_string(),
            18 => "DOS863".to_string(),
            19 => "DOS864".to_string(),
            20 => "DOS865".to_string(),
            21 => "DOS869".to_string(),
            22 => "DOS932".to_string(),
            23 => "MACINTOSH".to_string(),
            24 => "BIG5".to_string(),
            25 => "KSC5601".to_string(),
            26 => "JOHAB".to_string(),
            27 => "DOS866".to_string(),
            28 => "ANSI_1250".to_string(),
            29 => "ANSI_1251".to_string(),
            30 => "ANSI_1252".to_string(),
            31 => "GB2312".to_string(),
            32 => "ANSI_1253".to_string(),
            33 => "ANSI_1254".to_string(),
            34 => "ANSI_1255".to_string(),
            35 => "ANSI_1256".to_string(),
            36 => "ANSI_1257".to_string(),
            37 => "ANSI_874".to_string(),
            38 => "ANSI_932".to_string(),
            39 => "ANSI_936".to_string(),
            40 => "ANSI_949".to_string(),
            41 => "ANSI_950".to_string(),
            42 => "ANSI_1361".to_string(),
            43 => "ANSI_1200".to_string(),
            44 => "ANSI_1258".to_string(),
            other => format!("CODEPAGE_{other}"),
        }
    }

    /// Decoder for this code page. Unknown indices fall back to Windows-1252.
    pub fn encoding(&self) -> &'static Encoding {
        match self.0 {
            0 => encoding_rs::UTF_8,
            3 => encoding_rs::ISO_8859_2,
            4 => encoding_rs::ISO_8859_3,
            5 => encoding_rs::ISO_8859_4,
            6 => encoding_rs::ISO_8859_5,
            7 => encoding_rs::ISO_8859_6,
            8 => encoding_rs::ISO_8859_7,
            9 => encoding_rs::ISO_8859_8,
            10 => encoding_rs::WINDOWS_1254,
            22 | 38 => encoding_rs::SHIFT_JIS,
            23 => encoding_rs::MACINTOSH,
            24 | 41 => encoding_rs::BIG5,
            25 | 40 => encoding_rs::EUC_KR,
            27 => encoding_rs::IBM866,
            28 => encoding_rs::WINDOWS_1250,
            29 => encoding_rs::WINDOWS_1251,
            31 | 39 => encoding_rs::GBK,
            32 => encoding_rs::WINDOWS_1253,
            33 => encoding_rs::WINDOWS_1254,
            34 => encoding_rs::WINDOWS_1255,
            35 => encoding_rs::WINDOWS_1256,
            36 => encoding_rs::WINDOWS_1257,
            37 => encoding_rs::WINDOWS_874,
            43 => encoding_rs::UTF_16LE,
            44 => encoding_rs::WINDOWS_1258,
            _ => encoding_rs::WINDOWS_1252,
        }
    }

    /// Decode raw bytes, dropping a trailing NUL terminator.
    pub fn decode(&self, bytes: &[u8]) -> String {
        let bytes = match bytes.iter().position(|&b| b == 0) {
            Some(end) if self.0 != 43 => &bytes[..end],
            _ => bytes,
        };
        let (text, _, _) = self.encoding().decode(bytes);
        text.into_owned()
    }
}

impl Default for CodePage {
    fn default() -> Self {
        Self::ANSI_1252
    }
}
