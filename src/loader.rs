use crate::{AbxDecoder, DecodeOptions, Document, Result};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// High-level entry points that materialize ABX input and decode it
pub struct AbxLoader;

impl AbxLoader {
    /// Decode ABX from any reader
    ///
    /// The reader is drained into memory first; the decoder itself never
    /// performs I/O.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use abxtree::AbxLoader;
    /// use std::fs::File;
    ///
    /// let input = File::open("packages.xml").unwrap();
    /// let document = AbxLoader::load_reader(input).unwrap();
    /// println!("{}", document.root().tag_name_lossy());
    /// ```
    pub fn load_reader<R: Read>(reader: R) -> Result<Document> {
        Self::load_reader_with(reader, &DecodeOptions::default())
    }

    pub fn load_reader_with<R: Read>(mut reader: R, options: &DecodeOptions) -> Result<Document> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::load_bytes_with(&data, options)
    }

    /// Decode an ABX file
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use abxtree::AbxLoader;
    ///
    /// let document = AbxLoader::load_file("/data/system/packages.xml").unwrap();
    /// ```
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document> {
        Self::load_file_with(path, &DecodeOptions::default())
    }

    pub fn load_file_with<P: AsRef<Path>>(path: P, options: &DecodeOptions) -> Result<Document> {
        let path = path.as_ref();
        log::debug!("Loading ABX file {}", path.display());
        let input_file = File::open(path)?;
        Self::load_reader_with(BufReader::new(input_file), options)
    }

    /// Decode ABX read from stdin
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use abxtree::AbxLoader;
    ///
    /// // cat packages.xml | abxtree dump -
    /// let document = AbxLoader::load_stdin().unwrap();
    /// ```
    pub fn load_stdin() -> Result<Document> {
        Self::load_stdin_with(&DecodeOptions::default())
    }

    pub fn load_stdin_with(options: &DecodeOptions) -> Result<Document> {
        let stdin = io::stdin();
        Self::load_reader_with(stdin.lock(), options)
    }

    /// Decode ABX data that is already in memory
    pub fn load_bytes(abx_data: &[u8]) -> Result<Document> {
        Self::load_bytes_with(abx_data, &DecodeOptions::default())
    }

    pub fn load_bytes_with(abx_data: &[u8], options: &DecodeOptions) -> Result<Document> {
        AbxDecoder::with_options(abx_data, options.clone()).decode()
    }

    /// Decode from a path, treating `-` as stdin
    pub fn load_path_or_stdin(input: &str, options: &DecodeOptions) -> Result<Document> {
        match input {
            "-" => Self::load_stdin_with(options),
            path => Self::load_file_with(path, options),
        }
    }
}
