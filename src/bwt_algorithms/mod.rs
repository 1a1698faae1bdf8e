//! The bwt_algorithms module reverses the block sorting stage of the bzip2 decompressor.
//!
//! BZIP2 uses the Burrow-Wheeler Transform (BWT) to prepare data for compression. This transform alters the data in such
//! a way that runs of similar bytes are more likely to occur. Undoing it only needs the last column of the sorted
//! rotations, the origin pointer stored in the block header, and a frequency count of the bytes.
//!
pub mod bwt_decode;
