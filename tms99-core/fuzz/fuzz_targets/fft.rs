#![no_main]

use libfuzzer_sys::fuzz_target;

use tms99_core::dsp::complex::Complex;
use tms99_core::dsp::fft::Fft;

fuzz_target!(|data: Vec<(f32, f32)>| {
    if data.is_empty() {
        return;
    }

    // Largest power-of-two prefix length that fits within the FFT's size limit.
    let pow2_len = (1usize << (usize::BITS - 1 - data.len().leading_zeros())).min(Fft::MAX_SIZE);

    let mut input: Vec<Complex> =
        data[..pow2_len].iter().map(|&(re, im)| Complex::new(re, im)).collect();

    let fft = Fft::new(input.len());
    fft.fft_inplace(&mut input);
    fft.ifft_inplace(&mut input);
});
