use crate::Result;
use crate::error::Error;

/// Options applied to a native decoder before it is initialized.
///
/// This struct represents *library-level configuration*, not CLI flags directly. The CLI maps
/// user input onto it so other frontends can construct options programmatically.
#[derive(Debug, Clone)]
pub struct DecoderOpts {
    /// Ask libFLAC to verify the decoded audio against the MD5 in STREAMINFO.
    ///
    /// A mismatch is only reported when the decoder finishes; it never interrupts decoding.
    pub md5_checking: bool,

    /// Also deliver VORBIS_COMMENT blocks to the metadata handler.
    ///
    /// libFLAC only reports STREAMINFO by default.
    pub vorbis_comments: bool,
}

impl Default for DecoderOpts {
    fn default() -> Self {
        Self {
            md5_checking: false,
            vorbis_comments: true,
        }
    }
}

/// Options for packing decoded samples into interleaved little-endian PCM.
#[derive(Debug, Clone)]
pub struct PcmOpts {
    /// Widest sample the caller accepts, in bits. Deeper streams are truncated to this width by
    /// dropping their least significant bytes.
    ///
    /// Must be one of 8, 16, 24 or 32.
    pub max_output_bit_depth: u32,
}

impl PcmOpts {
    pub fn validate(&self) -> Result<()> {
        match self.max_output_bit_depth {
            8 | 16 | 24 | 32 => Ok(()),
            other => Err(Error::msg(format!(
                "max output bit depth must be 8, 16, 24 or 32, got {other}"
            ))),
        }
    }
}

impl Default for PcmOpts {
    fn default() -> Self {
        Self {
            max_output_bit_depth: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm_opts_accept_whole_byte_depths_only() {
        assert!(PcmOpts::default().validate().is_ok());
        for depth in [8, 16, 24, 32] {
            let opts = PcmOpts {
                max_output_bit_depth: depth,
            };
            assert!(opts.validate().is_ok());
        }

        let err = PcmOpts {
            max_output_bit_depth: 20,
        }
        .validate()
        .unwrap_err();
        assert!(err.to_string().contains("got 20"));
    }
}
