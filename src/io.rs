use tokio::io::{
    self, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter,
};

/// LineIo is created from an `AsyncRead` and an `AsyncWrite`. Lines are read and written as raw
/// bytes including their line terminator, so everything that is passed through ends up in the
/// output unchanged.
pub struct LineIo<R, W>
where
    R: AsyncRead,
    W: AsyncWrite,
{
    input: BufReader<R>,
    output: BufWriter<W>,
    line_number: usize,
}

impl<R, W> LineIo<R, W>
where
    R: AsyncRead + std::marker::Unpin,
    W: AsyncWrite + std::marker::Unpin,
{
    pub fn new(read: R, write: W) -> LineIo<R, W> {
        LineIo {
            input: BufReader::new(read),
            output: BufWriter::new(write),
            line_number: 0,
        }
    }

    /// Replace the contents of `line` with the next line of input.
    ///
    /// Returns: `false` at end of input
    pub async fn read_line(&mut self, line: &mut Vec<u8>) -> io::Result<bool> {
        line.clear();
        match self.input.read_until(b'\n', line).await? {
            0 => Ok(false),
            _n => {
                self.line_number += 1;
                Ok(true)
            }
        }
    }

    /// 1-based number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub async fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.output.write_all(line).await
    }

    /// Flush buffered output and close the writer.
    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.output.shutdown().await
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input.into_inner(), self.output.into_inner())
    }
}
